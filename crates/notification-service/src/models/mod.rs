//! 通知分发领域模型
//!
//! 包含推送 token、用户偏好、通知请求/记录及相关枚举。

mod enums;
mod notification;
mod preferences;
mod token;

pub use enums::*;
pub use notification::*;
pub use preferences::*;
pub use token::*;
