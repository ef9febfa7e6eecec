#![no_main]

use bulkmt::bulk::Bulk;
use bulkmt::parser::BulkParser;
use libfuzzer_sys::fuzz_target;

const MAX_LINES: usize = 256;

fuzz_target!(|data: &[u8]| {
    let Some((&size_byte, rest)) = data.split_first() else {
        return;
    };
    let bulk_size = (size_byte % 8) as usize;

    let text = String::from_utf8_lossy(rest);
    let lines: Vec<String> = text.lines().take(MAX_LINES).map(str::to_string).collect();
    let line_count = lines.len();

    let mut published = Vec::new();
    let mut parser = BulkParser::new(bulk_size);
    parser.subscribe(|bulk: &Bulk| published.push(bulk.len()));
    let stats = parser.exec(lines);
    drop(parser);

    assert_eq!(stats.lines, line_count);
    assert_eq!(stats.blocks, published.len());
    assert_eq!(stats.commands, published.iter().sum::<usize>());
    assert!(published.iter().all(|&len| len > 0));
    if bulk_size > 0 {
        assert!(stats.commands + stats.discarded <= line_count);
    }
});
