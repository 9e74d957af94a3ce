use std::io::{Cursor, Read};

use tunep_core::ProcedureRegistry;

use crate::error::{ImportError, Parsed};
use crate::sigtap::{parse_procedure_table, parse_relationship_table, LinkReport};

pub const PROCEDURE_MEMBER: &str = "tb_procedimento.txt";
pub const RELATIONSHIP_MEMBER: &str = "rl_procedimento_sia_sih.txt";

/// Reads one member of a ZIP archive held in memory.
pub fn read_member(archive: &[u8], name: &str) -> Result<Vec<u8>, ImportError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))?;
    let mut file = match zip.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ImportError::MissingMember(name.to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Procedure registry decoded from a unified-table archive, with the
/// relationship table already applied.
#[derive(Debug)]
pub struct SigtapArchive {
    pub procedures: Parsed<ProcedureRegistry>,
    pub links: Option<LinkReport>,
}

impl SigtapArchive {
    pub fn load(archive: &[u8]) -> Result<Self, ImportError> {
        let procedure_bytes = read_member(archive, PROCEDURE_MEMBER)?;
        let mut procedures = parse_procedure_table(&procedure_bytes);
        procedures.log_skipped(PROCEDURE_MEMBER);

        let links = match read_member(archive, RELATIONSHIP_MEMBER) {
            Ok(bytes) => {
                let report = parse_relationship_table(&bytes, &mut procedures.records);
                if !report.skipped.is_empty() {
                    tracing::warn!(
                        "{RELATIONSHIP_MEMBER}: skipped {} malformed line(s)",
                        report.skipped.len()
                    );
                }
                Some(report)
            }
            Err(ImportError::MissingMember(_)) => {
                tracing::warn!("{RELATIONSHIP_MEMBER} not in archive; no legacy codes linked");
                None
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            "Loaded {} procedures ({} legacy links)",
            procedures.records.len(),
            links.as_ref().map_or(0, |l| l.linked)
        );
        Ok(Self { procedures, links })
    }

    pub fn skipped_count(&self) -> usize {
        self.procedures.skipped_count() + self.links.as_ref().map_or(0, |l| l.skipped.len())
    }
}
