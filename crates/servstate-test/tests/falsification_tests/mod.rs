//! Cross-crate falsification tests.
//!
//! | Category | ID Range | Description |
//! |----------|----------|-------------|
//! | A | F101-F110 | Lifecycle scenarios |
//! | B | F111-F120 | Contention |
//! | C | F121-F130 | Observation |

// Allow test-specific patterns that are denied in production code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod concurrency;
mod lifecycle;
mod observe;
