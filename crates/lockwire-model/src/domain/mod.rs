mod code;
pub use code::{Coded, ErrorCode};

mod device;
pub use device::{ConnectionState, Device, DeviceId, Link};

mod credential;
pub use credential::CredentialId;

mod token;
pub use token::{SignedToken, ValidityWindow};

mod wire;
pub use wire::{AppStatus, TerminalReply, TerminalRequest};

mod task_id;
pub use task_id::TaskId;

mod task_status;
pub use task_status::TaskStatus;

mod runner_state;
pub use runner_state::RunnerState;

mod task_info;
pub use task_info::TaskInfo;

pub(crate) mod time_serde;
