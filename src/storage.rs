mod document;

pub use document::{Document, LoadError, PAGE_EXTENSION};
