use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationOperation {
    /// Pop one level off the shell's navigation stack.
    Back,
}

impl Operation for NavigationOperation {
    type Output = ();
}

#[derive(Capability)]
pub struct Navigator<Ev> {
    context: CapabilityContext<NavigationOperation, Ev>,
}

impl<Ev> Navigator<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<NavigationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn back(&self) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(NavigationOperation::Back).await;
        });
    }
}
