use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

/// 插入列时可选的比例预设
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPreset {
    /// 1/1
    Full,
    /// 1/2 - 1/2
    Halves,
    /// 1/3 - 1/3 - 1/3
    Thirds,
    /// 1/4 - 1/4 - 1/4 - 1/4
    Quarters,
    /// 2/3 - 1/3
    TwoThirdsOneThird,
    /// 1/3 - 2/3
    OneThirdTwoThirds,
    /// 1/4 - 3/4
    QuarterThreeQuarters,
    /// 3/4 - 1/4
    ThreeQuartersQuarter,
    /// 1/2 - 1/4 - 1/4
    HalfQuarterQuarter,
    /// 1/4 - 1/4 - 1/2
    QuarterQuarterHalf,
    /// 1/4 - 1/2 - 1/4
    QuarterHalfQuarter,
}

impl ColumnPreset {
    pub const ALL: [ColumnPreset; 11] = [
        ColumnPreset::Full,
        ColumnPreset::Halves,
        ColumnPreset::Thirds,
        ColumnPreset::Quarters,
        ColumnPreset::TwoThirdsOneThird,
        ColumnPreset::OneThirdTwoThirds,
        ColumnPreset::QuarterThreeQuarters,
        ColumnPreset::ThreeQuartersQuarter,
        ColumnPreset::HalfQuarterQuarter,
        ColumnPreset::QuarterQuarterHalf,
        ColumnPreset::QuarterHalfQuarter,
    ];

    /// 每列的栅格宽度，总和为 12
    pub fn spans(&self) -> &'static [u8] {
        match self {
            ColumnPreset::Full => &[12],
            ColumnPreset::Halves => &[6, 6],
            ColumnPreset::Thirds => &[4, 4, 4],
            ColumnPreset::Quarters => &[3, 3, 3, 3],
            ColumnPreset::TwoThirdsOneThird => &[8, 4],
            ColumnPreset::OneThirdTwoThirds => &[4, 8],
            ColumnPreset::QuarterThreeQuarters => &[3, 9],
            ColumnPreset::ThreeQuartersQuarter => &[9, 3],
            ColumnPreset::HalfQuarterQuarter => &[6, 3, 3],
            ColumnPreset::QuarterQuarterHalf => &[3, 3, 6],
            ColumnPreset::QuarterHalfQuarter => &[3, 6, 3],
        }
    }

    pub fn ratio(&self) -> &'static str {
        match self {
            ColumnPreset::Full => "1/1",
            ColumnPreset::Halves => "1/2-1/2",
            ColumnPreset::Thirds => "1/3-1/3-1/3",
            ColumnPreset::Quarters => "1/4-1/4-1/4-1/4",
            ColumnPreset::TwoThirdsOneThird => "2/3-1/3",
            ColumnPreset::OneThirdTwoThirds => "1/3-2/3",
            ColumnPreset::QuarterThreeQuarters => "1/4-3/4",
            ColumnPreset::ThreeQuartersQuarter => "3/4-1/4",
            ColumnPreset::HalfQuarterQuarter => "1/2-1/4-1/4",
            ColumnPreset::QuarterQuarterHalf => "1/4-1/4-1/2",
            ColumnPreset::QuarterHalfQuarter => "1/4-1/2-1/4",
        }
    }
}

impl fmt::Display for ColumnPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ratio())
    }
}

impl FromStr for ColumnPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        ColumnPreset::ALL
            .into_iter()
            .find(|preset| preset.ratio() == wanted)
            .ok_or_else(|| anyhow!("未知的列比例: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;

    #[test]
    fn every_preset_fills_the_grid() {
        for preset in ColumnPreset::ALL {
            let total: u32 = preset.spans().iter().map(|s| u32::from(*s)).sum();
            assert_eq!(total, 12, "preset {}", preset);
        }
    }

    #[test]
    fn spans_match_ratio_list() {
        let fraction = |part: &str| -> u8 {
            let (num, den) = part.split_once('/').unwrap();
            12 * num.parse::<u8>().unwrap() / den.parse::<u8>().unwrap()
        };
        for preset in ColumnPreset::ALL {
            let expected: Vec<u8> = preset.ratio().split('-').map(fraction).collect();
            assert_eq!(preset.spans(), expected.as_slice(), "preset {}", preset);
        }
    }

    #[test]
    fn insert_columns_creates_one_column_per_span() {
        let mut row = Row::new();
        row.insert_columns(ColumnPreset::HalfQuarterQuarter);
        let spans: Vec<u8> = row.columns.iter().map(|c| c.span).collect();
        assert_eq!(spans, vec![6, 3, 3]);
        assert!(row.is_balanced());

        row.insert_columns(ColumnPreset::Full);
        assert_eq!(row.span_total(), 24);
        assert!(!row.is_balanced());
    }

    #[test]
    fn parses_ratio_strings() {
        assert_eq!("1/4 - 3/4".parse::<ColumnPreset>().unwrap(), ColumnPreset::QuarterThreeQuarters);
        assert!("5/7".parse::<ColumnPreset>().is_err());
    }
}
