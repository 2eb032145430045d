//! # EBICOS Workbench
//!
//! Tooling for writing EBICOS interlocking automation scripts: a structural
//! validator for the automation language and a retrieval engine over the
//! reference manuals.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐
//! │  lexer   │──▶│ validate │──▶│   query    │
//! │  vocab   │   │          │   │  (bundle)  │
//! └──────────┘   └──────────┘   └─────┬──────┘
//!                                     │
//! ┌───────────┐   ┌──────────┐   ┌────▼──────┐
//! │ knowledge │──▶│ chunk    │──▶│   rank    │
//! │ file/http │   │ mandatory│   │  terms    │
//! └───────────┘   └──────────┘   └───────────┘
//!                                     │
//!                      ┌──────────────┤
//!                      ▼              ▼
//!                 ┌─────────┐   ┌──────────┐
//!                 │   CLI   │   │   HTTP   │
//!                 │  (ebw)  │   │  server  │
//!                 └─────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ebw validate ./scripts/LKP12.txt       # structural check
//! ebw sources                            # load reference documents
//! ebw search "NAR DAA UTF"               # retrieve passages
//! ebw serve                              # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`vocab`] | Command vocabularies |
//! | [`lexer`] | Comment stripping and line classification |
//! | [`validate`] | Structural validation of automation scripts |
//! | [`models`] | Core data types |
//! | [`config`] | TOML configuration parsing |
//! | [`terms`] | Term normalization |
//! | [`chunk`] | Reference text chunking |
//! | [`mandatory`] | Mandatory snippet extraction |
//! | [`rank`] | Corpus and overlap ranking |
//! | [`extract`] | PDF/text extraction |
//! | [`knowledge`] | Lazy, single-flight corpus loading |
//! | [`query`] | Query composition and context bundles |
//! | [`sources`] | Reference source status |
//! | [`server`] | HTTP server |

pub mod chunk;
pub mod config;
pub mod extract;
pub mod knowledge;
pub mod lexer;
pub mod mandatory;
pub mod models;
pub mod query;
pub mod rank;
pub mod server;
pub mod sources;
pub mod terms;
pub mod validate;
pub mod vocab;
