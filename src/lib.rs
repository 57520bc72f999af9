// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod advisor;
pub mod cli;
pub mod db;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod schedule;
pub mod utils;
pub mod commands;
