mod items;
mod math;
mod text;

use crate::core::CommandRegistry;

/// Register every built-in command table.
pub fn register_all(reg: &mut CommandRegistry) {
    items::register(reg);
    math::register(reg);
    text::register(reg);
}
