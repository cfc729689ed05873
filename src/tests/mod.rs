// Copyright (c) 2021 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

pub(crate) mod read;
pub(crate) mod write;

/// Initialises `env_logger` once, so `tracing` events from the code under test are visible with `RUST_LOG`.
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
