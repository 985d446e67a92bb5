//! Fixtures shared by the decoder benchmarks.

/// A named input together with the size class it is reported under.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    size: SizeClass,
    file: TestFile,
}

impl TestCase {
    pub fn small(name: &'static str, file: TestFile) -> Self {
        Self { name, size: SizeClass::Small, file }
    }

    pub fn normal(name: &'static str, file: TestFile) -> Self {
        Self { name, size: SizeClass::Normal, file }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn size(&self) -> SizeClass {
        self.size
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }
}

/// A captured wire message, embedded with `include_str!`.
#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// The content cut into slices of `size` bytes, as a slow peer would deliver it.
    pub fn fragments(&self, size: usize) -> impl Iterator<Item = &'static [u8]> {
        self.content.as_bytes().chunks(size)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum SizeClass {
    Small,
    Normal,
}
