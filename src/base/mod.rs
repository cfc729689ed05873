// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A blocking implementation over `std`'s IO types.

pub mod read;
pub mod write;
