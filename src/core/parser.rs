use crate::domain::model::Reading;

pub const DEFAULT_DELIMITER: char = ',';
const FIELD_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineVerdict {
    Accepted(Reading),
    Empty,
    Discarded,
}

/// 把一行文字切成 距離/角度/電流 三個欄位，欄位內容不做任何檢查
#[derive(Debug, Clone, Copy)]
pub struct RecordParser {
    delimiter: char,
}

impl RecordParser {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn parse(&self, line: &str) -> LineVerdict {
        if line.is_empty() {
            return LineVerdict::Empty;
        }
        if !line.contains(self.delimiter) {
            return LineVerdict::Discarded;
        }

        let fields: Vec<&str> = line.split(self.delimiter).collect();
        if fields.len() != FIELD_COUNT {
            return LineVerdict::Discarded;
        }

        LineVerdict::Accepted(Reading {
            distance_cm: fields[0].to_string(),
            servo_angle_deg: fields[1].to_string(),
            current_a: fields[2].to_string(),
        })
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(line: &str) -> Reading {
        match RecordParser::default().parse(line) {
            LineVerdict::Accepted(reading) => reading,
            other => panic!("expected accepted line, got {:?}", other),
        }
    }

    #[test]
    fn test_three_fields_accepted() {
        let reading = accepted("12.50,90,0.35");
        assert_eq!(reading.fields(), ["12.50", "90", "0.35"]);
    }

    #[test]
    fn test_wrong_field_count_discarded() {
        let parser = RecordParser::default();
        assert_eq!(parser.parse("12.50,90"), LineVerdict::Discarded);
        assert_eq!(parser.parse("12.50,90,0.35,7"), LineVerdict::Discarded);
        assert_eq!(parser.parse("12.50,90,0.35,"), LineVerdict::Discarded);
    }

    #[test]
    fn test_line_without_delimiter_discarded() {
        let parser = RecordParser::default();
        assert_eq!(parser.parse("READY"), LineVerdict::Discarded);
        assert_eq!(parser.parse(""), LineVerdict::Empty);
    }

    #[test]
    fn test_fields_kept_verbatim() {
        // 沒有數值檢查，非數字也照收
        let reading = accepted("abc, 90 ,-");
        assert_eq!(reading.fields(), ["abc", " 90 ", "-"]);

        let reading = accepted(",,");
        assert_eq!(reading.fields(), ["", "", ""]);
    }

    #[test]
    fn test_custom_delimiter() {
        let parser = RecordParser::new(';');
        assert!(matches!(parser.parse("12.50;90;0.35"), LineVerdict::Accepted(_)));
        assert_eq!(parser.parse("12.50,90,0.35"), LineVerdict::Discarded);
    }
}
