/// Operator actions on the `active`/`deleted` flags of stocks and masters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Retire,
    Activate,
    Delete,
}

pub trait Lifecycle {
    fn active_mut(&mut self) -> &mut bool;
    fn deleted_mut(&mut self) -> &mut bool;

    /// Deletion is one-way: no action clears `deleted`.
    fn apply(&mut self, action: LifecycleAction) {
        match action {
            LifecycleAction::Retire => *self.active_mut() = false,
            LifecycleAction::Activate => *self.active_mut() = true,
            LifecycleAction::Delete => *self.deleted_mut() = true,
        }
    }
}
