//! sea-orm entities for the HR service.

pub mod employee;
pub mod training_list;
