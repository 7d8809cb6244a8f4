//! Client side of the board: the gateway seam, an HTTP implementation of it,
//! the in-memory column state, and the session that drives both.

pub mod assistant;
pub mod board;
pub mod gateway;
pub mod http;
pub mod lists;
pub mod settings;
pub mod wire;

pub use assistant::GatewayDraftProvider;
pub use board::{ClientError, Notice, NoticeLevel, Operation, TaskBoard};
pub use gateway::{GatewayError, TaskGateway};
pub use http::HttpGateway;
pub use lists::{Column, FilteredColumn, ListError, MoveOutcome, RankUpdate, StatusFilter, TaskFilter, TaskLists};
pub use settings::{BoardSettings, ClientSettings, SettingsError, Theme};
