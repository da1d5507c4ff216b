// Building blocks shared by the installers: process execution, the pipeline
// engine, resource-file editing and the system-level steps that are not
// "install a tool" (privilege grant, login shell change).

pub mod command_runner;
pub mod context;
pub mod pipeline;
pub mod platform;
pub mod privilege;
pub mod rc_editor;
pub mod readiness;
pub mod shell_changer;
pub mod utilities;
