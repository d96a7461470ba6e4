/*
 *  Perftdiff, a move generation checker for chess engines.
 *  Copyright (C) 2024 ToTheAnd
 *
 *  Perftdiff is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  Perftdiff is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with Perftdiff. If not, see <https://www.gnu.org/licenses/>.
 */

use std::process::exit;

use colored::Colorize;

use perftdiff::run::RunStatus;
use perftdiff::run_program;

fn main() {
    match run_program() {
        Ok(RunStatus::HaltedOnMismatch) => exit(1),
        Ok(_) => {}
        Err(err) => {
            eprintln!("{} {err:#}", "Error:".red());
            exit(2);
        }
    }
}
