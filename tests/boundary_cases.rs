mod support;

use multipart_stream::{MultipartParser, ParserConfig};

#[tokio::test]
async fn body_containing_boundary_prefix_but_not_full_boundary_is_verbatim() {
    // The body contains "\r\n--X" which is a genuine prefix of the real
    // terminator "\r\n--XY" but is not followed by the full boundary token;
    // it must be emitted as ordinary body content, not treated as a match.
    let raw = concat!(
        "--XY\r\n",
        "Content-Disposition: form-data; name=\"f\"\r\n",
        "\r\n",
        "before\r\n--X-not-the-boundary after\r\n",
        "--XY--\r\n",
    )
    .as_bytes();
    let body = support::whole_body(raw);
    let mut parser = MultipartParser::new(body, "XY", ParserConfig::default());

    let part = parser.next_part().await.unwrap().expect("one part");
    assert_eq!(
        part.text().await.unwrap(),
        "before\r\n--X-not-the-boundary after"
    );
    assert!(parser.next_part().await.unwrap().is_none());
}

#[tokio::test]
async fn split_boundary_across_chunk_edge_is_still_found() {
    // Split right in the middle of the terminating boundary sequence,
    // across two separate frames, to exercise the partial-suffix probe.
    let prefix = b"--X\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\nhello\r\n--";
    let suffix = b"X--\r\n";
    let body = support::chunked_body(vec![prefix, suffix]);
    let mut parser = MultipartParser::new(body, "X", ParserConfig::default());

    let part = parser.next_part().await.unwrap().expect("one part");
    assert_eq!(part.text().await.unwrap(), "hello");
    assert!(parser.next_part().await.unwrap().is_none());
}

#[tokio::test]
async fn content_ending_in_crlf_dash_before_true_boundary() {
    // The body's last real byte before the boundary is itself "-", forcing
    // the partial-suffix probe to pin, then extend, then finally match.
    let raw = b"--X\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\na-\r\n--X--\r\n";
    let body = support::whole_body(raw);
    let mut parser = MultipartParser::new(body, "X", ParserConfig::default());

    let part = parser.next_part().await.unwrap().expect("one part");
    assert_eq!(part.text().await.unwrap(), "a-");
}

#[tokio::test]
async fn preamble_and_epilogue_are_discarded() {
    let raw = concat!(
        "this is preamble text, it is not part of any part\r\n",
        "--X\r\n",
        "Content-Disposition: form-data; name=\"f\"\r\n",
        "\r\n",
        "v\r\n",
        "--X--\r\n",
        "this is epilogue text\r\n",
    )
    .as_bytes();
    let body = support::whole_body(raw);
    let mut parser = MultipartParser::new(body, "X", ParserConfig::default());

    let part = parser.next_part().await.unwrap().expect("one part");
    assert_eq!(part.text().await.unwrap(), "v");
    assert!(parser.next_part().await.unwrap().is_none());
}

#[tokio::test]
async fn single_byte_chunking_of_minimal_request() {
    let raw = b"--X\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\nv\r\n--X--\r\n";
    let body = support::byte_by_byte_body(raw);
    let mut parser = MultipartParser::new(body, "X", ParserConfig::default());

    let part = parser.next_part().await.unwrap().expect("exactly one part");
    assert_eq!(part.text().await.unwrap(), "v");
    assert!(parser.next_part().await.unwrap().is_none());
}
