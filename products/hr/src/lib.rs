//! HR vertical slice.
//!
//! The centrepiece is [`EmployeeTransformer`], which maps an `employee` row to
//! the JSON shape served over HTTP and turns client payloads back into
//! validated writes. Two things on the way out are computed per request:
//!
//! * `manager`: looked up with [`get_manager_for_employee`] and rendered by
//!   the transformer's [`ManagerRenderer`] ([`ShortManager`] or
//!   [`FullManager`]);
//! * `allow_edit`: the answer of [`has_permission_to_edit`] for the viewer
//!   passed in.
//!
//! Creating an employee also flips `hired` on every training-list entry with
//! the same login, inside the same transaction as the insert.

mod additional_info;
mod error;
mod input;
mod manager;
mod permission;
mod store;
mod training;
mod transformer;

pub use additional_info::AdditionalInfo;
pub use error::HrError;
pub use input::{EmployeeInput, InputMode, ManagerField};
pub use manager::{
    FullManager, ManagerDetail, ManagerRecord, ManagerRenderer, ManagerSummary, ManagerVariant,
    ManagerView, ShortManager, get_manager_for_employee,
};
pub use permission::has_permission_to_edit;
pub use store::{Page, find_employee, list_employees};
pub use training::{TrainingEntry, add_training_entry, list_training, mark_hired};
pub use transformer::{EmployeeTransformer, EmployeeView};
