use crate::http::HttpDirectoryStore;
use crate::store::{DirectoryStore, FileStore, Offline, StoreError};

/// Where missing reference files are fetched from.
pub enum Remote {
    Directory(DirectoryStore),
    Http(HttpDirectoryStore),
    Offline(Offline),
}

impl Remote {
    /// `http(s)://` locations become index-page stores, anything else is a
    /// directory path (for example a mounted share). `None` means offline.
    pub fn from_location(location: Option<&str>) -> Result<Self, StoreError> {
        let Some(location) = location.map(str::trim).filter(|l| !l.is_empty()) else {
            return Ok(Remote::Offline(Offline));
        };
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return HttpDirectoryStore::new(location).map(Remote::Http);
        }
        Ok(Remote::Directory(DirectoryStore::new(location)))
    }

    fn inner(&self) -> &dyn FileStore {
        match self {
            Remote::Directory(s) => s,
            Remote::Http(s) => s,
            Remote::Offline(s) => s,
        }
    }
}

impl FileStore for Remote {
    fn location(&self) -> String {
        self.inner().location()
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        self.inner().list()
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        self.inner().fetch(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_kinds() {
        assert!(matches!(Remote::from_location(None).unwrap(), Remote::Offline(_)));
        assert!(matches!(Remote::from_location(Some("  ")).unwrap(), Remote::Offline(_)));
        assert!(matches!(
            Remote::from_location(Some("/mnt/datasus/SIHSUS/Dados")).unwrap(),
            Remote::Directory(_)
        ));
        assert!(matches!(
            Remote::from_location(Some("HTTPS://example.org/tup/")).unwrap(),
            Remote::Http(_)
        ));
    }
}
