mod apply;
mod clean;
mod list;
mod render;
mod select;
mod status;

pub use apply::cmd_apply;
pub use clean::cmd_clean;
pub use list::cmd_list;
pub use render::cmd_render;
pub use select::{ScopeArg, cmd_select};
pub use status::cmd_status;
