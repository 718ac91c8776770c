// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write operations.
//!
//! Each `persist_*` function writes one transition's new scoped state and
//! its audit event inside a single transaction.

pub mod audit;
pub mod availability;
pub mod events;
pub mod plans;
pub mod sequence;
