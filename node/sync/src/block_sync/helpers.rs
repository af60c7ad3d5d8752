// Copyright (c) 2019-2025 Provable Inc.
// This file is part of the meridian library.

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:

// http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Collapses a sorted list of heights into a compact range string,
/// e.g. `[1-3, 7, 9-10]`. Used to keep log lines short.
pub fn rangify_heights(heights: &[u64]) -> String {
    let mut ranges: Vec<(u64, u64)> = Vec::new();
    for &height in heights {
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == height => *end = height,
            _ => ranges.push((height, height)),
        }
    }

    let parts: Vec<String> = ranges
        .into_iter()
        .map(|(start, end)| if start == end { format!("{start}") } else { format!("{start}-{end}") })
        .collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::rangify_heights;

    #[test]
    fn test_rangify_empty() {
        assert_eq!(rangify_heights(&[]), "[]");
    }

    #[test]
    fn test_rangify_singletons_and_runs() {
        assert_eq!(rangify_heights(&[4]), "[4]");
        assert_eq!(rangify_heights(&[1, 2, 3]), "[1-3]");
        assert_eq!(rangify_heights(&[1, 2, 3, 7, 9, 10]), "[1-3, 7, 9-10]");
    }

    #[test]
    fn test_rangify_long_run() {
        let heights: Vec<u64> = (100..=5_000).collect();
        assert_eq!(rangify_heights(&heights), "[100-5000]");
    }
}
