pub mod ai;
pub mod board;
pub mod task;
pub mod user;

pub use ai::{GenerateRequest, GenerateResponse, GeneratedSubtask, GeneratedTask};
pub use board::{Board, CustomStatus, DeleteColumnResponse, MessageResponse, NewBoardRequest};
pub use task::{
    BUILTIN_STATUSES, DEFAULT_STATUS, DEFAULT_TIMEZONE, NewTaskRequest, PinResponse, StatusChange, Subtask, Task,
    TaskPatch, TaskRow, is_builtin_status,
};
pub use user::{AuthResponse, Credentials, LoginRequest, RegisterRequest, UpdateProfileRequest, User};
