pub mod balance;
pub mod closing;
pub mod games;
pub mod guard;
pub mod money;
pub mod schedule;
pub mod validation;
