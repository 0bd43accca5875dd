//! # Pager - Write-Back Page Cache
//!
//! The pager owns the database file and up to [`TABLE_MAX_PAGES`] cached
//! page buffers. It is the only component that touches the file.
//!
//! ## Caching Discipline
//!
//! A cache slot is either absent (page never referenced) or holds a boxed
//! 4KB buffer. The first `get_page` for a page number allocates a zeroed
//! buffer and, when the page lies within the file's current extent, fills it
//! with one positional read. Pages past the extent stay zeroed; they become
//! real once the tree writes into them and the cache flushes. Loaded pages
//! are pinned until the pager goes away.
//!
//! ## Allocation
//!
//! `get_unused_page_num` hands out `num_pages`; materializing that page via
//! `get_page` bumps `num_pages` so the next allocation does not collide.
//! Pages are never recycled; the file only grows, in whole pages, appended
//! by `flush`.
//!
//! ## Durability
//!
//! Mutations live in the cached buffers until `flush_all` writes every
//! resident page back and syncs the file. The `Drop` impl makes a
//! best-effort flush so data survives an early return, but a clean
//! `Table::close` is the supported shutdown path.
//!
//! ## Error Handling
//!
//! All failures are `eyre::Result` with file context: out-of-bounds page
//! numbers, flushing a page that was never loaded, a file whose size is not
//! a whole number of pages, and raw I/O errors. Callers treat these as
//! fatal.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::Path;

use eyre::{ensure, Result, WrapErr};

use crate::config::{PAGE_SIZE, TABLE_MAX_PAGES};

type PageBuf = [u8; PAGE_SIZE];

pub struct Pager {
    file: File,
    file_length: u64,
    num_pages: u32,
    pages: [Option<Box<PageBuf>>; TABLE_MAX_PAGES],
}

impl Pager {
    /// Opens the database file, creating it with mode 0600 if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .mode(0o600)
            .open(path)
            .wrap_err_with(|| format!("failed to open database file '{}'", path.display()))?;

        let file_length = file
            .metadata()
            .wrap_err_with(|| format!("failed to get metadata for '{}'", path.display()))?
            .len();

        ensure!(
            file_length % PAGE_SIZE as u64 == 0,
            "database file '{}' size {} is not a multiple of page size {}",
            path.display(),
            file_length,
            PAGE_SIZE
        );

        let num_pages = (file_length / PAGE_SIZE as u64) as u32;

        ensure!(
            num_pages as usize <= TABLE_MAX_PAGES,
            "database file '{}' holds {} pages, more than the {} page limit",
            path.display(),
            num_pages,
            TABLE_MAX_PAGES
        );

        Ok(Self {
            file,
            file_length,
            num_pages,
            pages: std::array::from_fn(|_| None),
        })
    }

    /// Number of pages the table currently occupies (cached or on disk).
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Returns the page number the next allocation will use. The caller
    /// consumes it by fetching that page with [`Pager::get_page`].
    pub fn get_unused_page_num(&self) -> Result<u32> {
        ensure!(
            (self.num_pages as usize) < TABLE_MAX_PAGES,
            "page allocation would exceed the {} page table limit",
            TABLE_MAX_PAGES
        );
        Ok(self.num_pages)
    }

    /// Fetches a page buffer, reading it from disk on first access.
    pub fn get_page(&mut self, page_num: u32) -> Result<&mut [u8]> {
        ensure!(
            (page_num as usize) < TABLE_MAX_PAGES,
            "page number out of bounds: {} (limit {})",
            page_num,
            TABLE_MAX_PAGES
        );

        if self.pages[page_num as usize].is_none() {
            let mut page: Box<PageBuf> = Box::new([0u8; PAGE_SIZE]);
            let offset = page_num as u64 * PAGE_SIZE as u64;

            if offset < self.file_length {
                self.file
                    .read_exact_at(&mut page[..], offset)
                    .wrap_err_with(|| format!("failed to read page {}", page_num))?;
            }

            if page_num >= self.num_pages {
                self.num_pages = page_num + 1;
            }
            self.pages[page_num as usize] = Some(page);
        }

        let page = self.pages[page_num as usize]
            .as_mut()
            .unwrap(); // INVARIANT: slot populated above
        Ok(&mut page[..])
    }

    /// Writes one cached page back to its file offset.
    pub fn flush(&mut self, page_num: u32) -> Result<()> {
        ensure!(
            (page_num as usize) < TABLE_MAX_PAGES,
            "page number out of bounds: {} (limit {})",
            page_num,
            TABLE_MAX_PAGES
        );

        let page = match &self.pages[page_num as usize] {
            Some(page) => page,
            None => eyre::bail!("tried to flush absent page {}", page_num),
        };

        let offset = page_num as u64 * PAGE_SIZE as u64;
        self.file
            .write_all_at(&page[..], offset)
            .wrap_err_with(|| format!("failed to write page {}", page_num))?;

        if offset + PAGE_SIZE as u64 > self.file_length {
            self.file_length = offset + PAGE_SIZE as u64;
        }

        Ok(())
    }

    /// Writes every resident page back and syncs the file.
    pub fn flush_all(&mut self) -> Result<()> {
        for page_num in 0..self.num_pages {
            if self.pages[page_num as usize].is_some() {
                self.flush(page_num)?;
            }
        }
        self.file.sync_all().wrap_err("failed to sync database file")
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        let _ = self.flush_all();
    }
}

impl std::fmt::Debug for Pager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("file_length", &self.file_length)
            .field("num_pages", &self.num_pages)
            .field(
                "resident",
                &self.pages.iter().filter(|p| p.is_some()).count(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn open_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let pager = Pager::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(pager.num_pages(), 0);
    }

    #[test]
    fn open_rejects_partial_trailing_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0u8; 100]).unwrap();

        let result = Pager::open(&path);

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not a multiple of page size"));
    }

    #[test]
    fn get_page_returns_zeroed_buffer_for_new_page() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(dir.path().join("test.db")).unwrap();

        let page = pager.get_page(0).unwrap();

        assert_eq!(page.len(), PAGE_SIZE);
        assert!(page.iter().all(|&b| b == 0));
        assert_eq!(pager.num_pages(), 1);
    }

    #[test]
    fn get_page_rejects_out_of_bounds() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(dir.path().join("test.db")).unwrap();

        let result = pager.get_page(TABLE_MAX_PAGES as u32);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("out of bounds"));
    }

    #[test]
    fn flush_rejects_absent_page() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(dir.path().join("test.db")).unwrap();

        let result = pager.flush(0);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("absent page"));
    }

    #[test]
    fn flushed_page_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut pager = Pager::open(&path).unwrap();
            let page = pager.get_page(0).unwrap();
            page[0] = 0xAB;
            page[PAGE_SIZE - 1] = 0xCD;
            pager.flush_all().unwrap();
        }

        let mut pager = Pager::open(&path).unwrap();
        assert_eq!(pager.num_pages(), 1);
        let page = pager.get_page(0).unwrap();
        assert_eq!(page[0], 0xAB);
        assert_eq!(page[PAGE_SIZE - 1], 0xCD);
    }

    #[test]
    fn get_unused_page_num_tracks_allocations() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(dir.path().join("test.db")).unwrap();

        assert_eq!(pager.get_unused_page_num().unwrap(), 0);
        pager.get_page(0).unwrap();
        assert_eq!(pager.get_unused_page_num().unwrap(), 1);
        pager.get_page(1).unwrap();
        assert_eq!(pager.get_unused_page_num().unwrap(), 2);
    }

    #[test]
    fn drop_flushes_resident_pages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut pager = Pager::open(&path).unwrap();
            let page = pager.get_page(0).unwrap();
            page[10] = 0x42;
        }

        let mut pager = Pager::open(&path).unwrap();
        let page = pager.get_page(0).unwrap();
        assert_eq!(page[10], 0x42);
    }
}
