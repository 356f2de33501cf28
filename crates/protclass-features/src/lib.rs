//! # protclass-features
//!
//! Per-residue feature tables for the protclass classifier.
//!
//! Each extractor turns one kind of upstream output into a table keyed by
//! residue:
//!
//! - [`ResidueInfo`]: CA atoms of a coordinate file
//! - [`dssp`]: secondary structure and accessibility from DSSP
//! - [`pssm`]: PSI-BLAST scoring matrices
//! - [`pockets`]: residues lining predicted cavities
//! - [`AaIndex`]: physicochemical indices from AAindex1
//! - [`spatial`]: features averaged over spatial neighbours
//!
//! ```no_run
//! use protclass_features::{AaIndex, aaindex::DEFAULT_INDICES};
//!
//! let db = AaIndex::read("aaindex1").unwrap();
//! let table = protclass_io::read_table("residues.csv").unwrap();
//! let annotated = db.annotate(&table, &DEFAULT_INDICES).unwrap();
//! protclass_io::write_table("residues_aaindex.xlsx", &annotated).unwrap();
//! ```
pub mod aaindex;
mod amino;
pub mod dssp;
mod error;
pub mod pockets;
pub mod pssm;
mod residues;
pub mod spatial;

pub use aaindex::{AaIndex, AaIndexEntry};
pub use amino::{AminoAcid, AAINDEX_ORDER};
pub use error::{ExtractError, Result};
pub use pssm::{PsiBlast, PssmMatrix};
pub use residues::{find_pdb_files, CaAtom, ResidueInfo};
