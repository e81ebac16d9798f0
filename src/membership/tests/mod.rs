//! Unit tests for the membership module.

mod failure_tests;
