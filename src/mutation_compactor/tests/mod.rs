mod helpers;
mod tests_tombstone;
