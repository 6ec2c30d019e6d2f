// THEORY:
// This file is the main entry point for the `median_vision` library crate.
// It exposes a small median-filter denoising engine with two execution strategies:
// a single-threaded sweep (`pipeline`) and a chunk-parallel sweep
// (`parallel_pipeline`), plus a `benchmark` harness that times one against the
// other, plus a `report` table and a `chart` for the collected timings.
//
// The building blocks (`core_modules`) are public so the pieces can be tested and
// reused on their own, but most callers only need the re-exports in `pipeline`.

pub mod benchmark;
pub mod chart;
pub mod core_modules;
pub mod parallel_pipeline;
pub mod pipeline;
pub mod report;
