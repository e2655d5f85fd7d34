/// Execution context presented by the host to a contract call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    deploying: bool,
}

impl CallContext {
    // Context of the deployment operation, the only one allowed to run the constructor
    pub fn deployment() -> Self {
        Self { deploying: true }
    }

    // Context of any regular operation
    pub fn regular() -> Self {
        Self { deploying: false }
    }

    pub fn is_deploying(&self) -> bool {
        self.deploying
    }
}
