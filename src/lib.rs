//! # `ca65kit` main library
//!
//! This library analyzes ca65 assembly source, the dialect of the cc65
//! toolchain's macro assembler for the 6502 family.  It ingests a workspace
//! of assembly files, builds a per-file symbol table, stitches files into
//! translation units via include and export/import edges, and answers
//! semantic queries over the result.
//!
//! ## Architecture
//!
//! The analysis core is in `lang::ca65`.  The scanner makes a single forward
//! pass over each file and produces a `SymbolTable`; the `Analyzer` owns the
//! tables together with the includes graph and the exports map, and the
//! resolver maps any reference to its entity with memoized results that are
//! invalidated as documents change.
//!
//! Query providers (hover, completion, navigation, call hierarchy, outline,
//! inlay hints, document links) are read-only collaborators on the
//! `Analyzer`.
//!
//! The language server compiles to a separate executable, its entry point is
//! in `src/bin/server-ca65/main.rs`.  Communication with a language client
//! is handled there, not here.

pub mod lang;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;
