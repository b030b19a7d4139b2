//! Custom widgets for the TUI

pub mod input_box;
pub mod message_list;
pub mod spinner;
pub mod template_list;

pub use input_box::InputBox;
pub use message_list::{Author, Bubble, MessageList};
pub use spinner::Spinner;
pub use template_list::{TemplateList, TemplatePicker};
