//! Metalbasis CLI.
//!
//! Command-line front end for the lot allocator: load a fund's published
//! backing table, roll the lot forward to the requested tax year, and
//! print the disposition/adjustment report.
//!
//! # Example Usage
//!
//! ```bash
//! metalbasis -t GLD -d 1/1/2020 -n 10 -p 150.00 -y 2021
//! metalbasis -t GLD -d 1/1/2020 -n 10 -p 150.00 -y 2021 -s 7/2/2021 --format json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
