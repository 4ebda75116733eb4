//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements    | Connects to                    |
//! |------------|---------------|--------------------------------|
//! | `command`  | CommandRunner | `std::process` subprocesses    |
//! | `console`  | EventSink     | stdout progress lines          |
//! | `gpio`     | GpioPort      | `/dev/gpiochipN` (feature `cdev`) |

pub mod command;
pub mod console;
#[cfg(feature = "cdev")]
pub mod gpio;
