//! Randomized tests comparing tree queries against a brute-force scan.

mod oracle;
