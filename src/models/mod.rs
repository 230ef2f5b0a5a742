pub mod building;
pub mod charge;
pub mod payment;
pub mod report;
pub mod service;
pub mod task;
pub mod user;

pub use building::*;
pub use charge::*;
pub use payment::*;
pub use report::*;
pub use service::*;
pub use task::*;
pub use user::*;
