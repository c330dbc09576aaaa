//! Data layer: workbook loading, measurement model, derived quantities.
//!
//! Architecture:
//! ```text
//!  .xlsx / .ods / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  requested sheets → Workbook (tables of cells)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌─────────────┐
//!   │ measurement  │  per-channel readings + reference power
//!   └─────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  derive   │  dB loss / detected power / FV÷FB ratio ± σ
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  export   │  computed series → CSV
//!   └──────────┘
//! ```

pub mod derive;
pub mod export;
pub mod loader;
pub mod measurement;
pub mod model;
