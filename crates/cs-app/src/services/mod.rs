pub mod capture;
pub mod history;
pub mod monitor;
pub mod recommendation;
pub mod retention;

#[cfg(test)]
pub(crate) mod testutil;
