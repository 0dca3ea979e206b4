//! Cross-module physics tests
