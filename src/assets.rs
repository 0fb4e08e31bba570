use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

/// Where the files of an asset set live.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// Contents compiled into the binary, as `(name, contents)` pairs.
    Embedded(&'static [(&'static str, &'static str)]),
    /// Names only; contents are read from `Assets::dir` on every load.
    Disk(&'static [&'static str]),
}

/// A fixed set of named files (templates, stylesheets, scripts).
#[derive(Debug, Clone, Copy)]
pub struct Assets {
    /// The directory these files came from.
    pub dir: &'static str,
    source: Source,
}

impl Assets {
    pub const fn embedded(dir: &'static str, files: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            dir,
            source: Source::Embedded(files),
        }
    }

    pub const fn on_disk(dir: &'static str, names: &'static [&'static str]) -> Self {
        Self {
            dir,
            source: Source::Disk(names),
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        match self.source {
            Source::Embedded(files) => files.iter().map(|(n, _)| *n).collect(),
            Source::Disk(names) => names.to_vec(),
        }
    }

    /// Get the contents of one file, or `None` if it is not part of the set.
    pub fn load(&self, name: &str) -> io::Result<Option<Cow<'static, str>>> {
        match self.source {
            Source::Embedded(files) => Ok(files
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, c)| Cow::Borrowed(*c))),
            Source::Disk(names) if names.iter().any(|n| *n == name) => {
                fs::read_to_string(Path::new(self.dir).join(name)).map(|s| Some(Cow::Owned(s)))
            }
            Source::Disk(_) => Ok(None),
        }
    }

    /// Load every file in the set.
    pub fn load_all(&self) -> io::Result<Vec<(&'static str, Cow<'static, str>)>> {
        let mut out = vec![];
        for name in self.names() {
            if let Some(contents) = self.load(name)? {
                out.push((name, contents));
            }
        }
        Ok(out)
    }
}

/// Declare a constant asset set: embedded in release builds, read from the
/// source tree in debug builds so edits show up without recompiling.
macro_rules! assets {
    ($constname:ident, $dirname:literal, [ $($filename:literal),* $(,)? ]) => {
        #[cfg(debug_assertions)]
        pub(crate) const $constname: $crate::assets::Assets = $crate::assets::Assets::on_disk(
            concat!(env!("CARGO_MANIFEST_DIR"), "/", $dirname),
            &[$( $filename, )*],
        );

        #[cfg(not(debug_assertions))]
        pub(crate) const $constname: $crate::assets::Assets = $crate::assets::Assets::embedded(
            concat!(env!("CARGO_MANIFEST_DIR"), "/", $dirname),
            &[$(
                (
                    $filename,
                    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/", $dirname, "/", $filename)),
                ),
            )*],
        );
    };
}

pub(crate) use assets;

#[cfg(test)]
mod tests {
    use super::*;

    const EMBEDDED: Assets = Assets::embedded("x", &[("a.txt", "alpha"), ("b.txt", "beta")]);

    #[test]
    fn embedded_lookup() {
        assert_eq!(EMBEDDED.names(), vec!["a.txt", "b.txt"]);
        assert_eq!(EMBEDDED.load("b.txt").unwrap().as_deref(), Some("beta"));
        assert_eq!(EMBEDDED.load("c.txt").unwrap(), None);
    }

    #[test]
    fn disk_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "from disk").unwrap();
        let dir_str: &'static str = Box::leak(dir.path().to_str().unwrap().to_string().into_boxed_str());
        let assets = Assets::on_disk(dir_str, &["a.txt", "gone.txt"]);

        assert_eq!(assets.load("a.txt").unwrap().as_deref(), Some("from disk"));
        assert_eq!(assets.load("other.txt").unwrap(), None);
        assert!(assets.load("gone.txt").is_err());
        assert!(assets.load_all().is_err());
    }
}
