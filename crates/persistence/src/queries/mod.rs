// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read operations.
//!
//! Every function takes the connection explicitly and never writes.

pub mod audit;
pub mod availability;
pub mod events;
pub mod plans;
