pub mod reconcile;
pub mod slots;
