pub mod backend;
pub mod drawing;
pub mod forms;
pub mod graphics;
pub mod layout;

#[cfg(test)]
pub(crate) mod mock;
