//! Property-based tests for lesson generation
//!
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Test Modules
//!
//! - `renderer_props`: the template language
//!   - Plain text renders unchanged
//!   - `#if` and `#unless` are exact complements
//!   - `#each` visits every element in order
//!   - Substituted values are never re-interpreted
//!   - Rendering is deterministic
//!
//! - `selection_props`: template selection by difficulty
//!   - A template is returned exactly when its range covers the level
//!
//! ## Configuration
//!
//! By default, proptest runs 256 cases per property:
//!
//! ```sh
//! PROPTEST_CASES=1000 cargo test property --release
//! ```

mod renderer_props;
mod selection_props;
