use fileport::http::parser::{MAX_PATH_LEN, ParseError, parse_http_request};
use fileport::http::request::Method;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.0\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.path, b"/");
    assert_eq!(parsed.content_length, None);
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_get_without_headers() {
    let req = b"GET /notes.txt HTTP/1.0\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, b"/notes.txt");
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_post_request_leaves_body_unconsumed() {
    let req = b"POST /upload.bin HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.path, b"/upload.bin");
    assert_eq!(parsed.content_length, Some(5));
    assert_eq!(&req[consumed..], b"hello");
}

#[test]
fn test_parse_method_is_case_insensitive() {
    let (get, _) = parse_http_request(b"get /a HTTP/1.0\r\n\r\n").unwrap();
    let (post, _) = parse_http_request(b"Post /a HTTP/1.0\r\nContent-Length: 0\r\n\r\n").unwrap();

    assert_eq!(get.method, Method::GET);
    assert_eq!(post.method, Method::POST);
}

#[test]
fn test_parse_content_length_header_case_insensitive() {
    let req = b"POST /a HTTP/1.0\r\ncontent-LENGTH:   42\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.content_length, Some(42));
}

#[test]
fn test_parse_last_content_length_wins() {
    let req = b"POST /a HTTP/1.0\r\nContent-Length: 1\r\nContent-Length: 2\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.content_length, Some(2));
}

#[test]
fn test_parse_other_headers_are_ignored() {
    let req = b"GET /a HTTP/1.0\r\nUser-Agent: test-client\r\nBrokenHeader\r\nAccept: */*\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, b"/a");
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.0\r\nHost: example.com\r\n";

    assert_eq!(parse_http_request(req), Err(ParseError::Incomplete));
}

#[test]
fn test_parse_incomplete_request_line() {
    assert_eq!(
        parse_http_request(b"GET /some/long/pa"),
        Err(ParseError::Incomplete)
    );
    assert_eq!(parse_http_request(b"POS"), Err(ParseError::Incomplete));
    assert_eq!(parse_http_request(b""), Err(ParseError::Incomplete));
}

#[test]
fn test_parse_invalid_http_method() {
    let result = parse_http_request(b"DELETE / HTTP/1.0\r\n\r\n");

    assert_eq!(result, Err(ParseError::InvalidMethod));
}

#[test]
fn test_parse_short_garbage_waits_for_more() {
    // Four bytes could still be the start of a method
    assert_eq!(parse_http_request(b"XYZW"), Err(ParseError::Incomplete));
    assert_eq!(parse_http_request(b"XYZWV"), Err(ParseError::InvalidMethod));
}

#[test]
fn test_parse_rejects_other_http_versions() {
    assert_eq!(
        parse_http_request(b"GET / HTTP/1.1\r\n\r\n"),
        Err(ParseError::InvalidRequest)
    );
    assert_eq!(
        parse_http_request(b"GET /\r\n\r\n"),
        Err(ParseError::InvalidRequest)
    );
}

#[test]
fn test_parse_path_must_be_absolute() {
    assert_eq!(
        parse_http_request(b"GET index.html HTTP/1.0\r\n\r\n"),
        Err(ParseError::InvalidPath)
    );
}

#[test]
fn test_parse_path_length_limit() {
    let longest = format!("/{}", "a".repeat(MAX_PATH_LEN - 4));
    let req = format!("GET {} HTTP/1.0\r\n\r\n", longest);
    let (parsed, _) = parse_http_request(req.as_bytes()).unwrap();
    assert_eq!(parsed.path, longest.as_bytes());

    let too_long = format!("GET /{} HTTP/1.0\r\n\r\n", "a".repeat(MAX_PATH_LEN - 3));
    assert_eq!(
        parse_http_request(too_long.as_bytes()),
        Err(ParseError::PathTooLong)
    );
}

#[test]
fn test_parse_negative_content_length() {
    let req = b"POST /a HTTP/1.0\r\nContent-Length: -5\r\n\r\n";

    assert_eq!(
        parse_http_request(req),
        Err(ParseError::InvalidContentLength)
    );
}

#[test]
fn test_parse_non_numeric_content_length() {
    for value in ["abc", "", "+5", "5 5"] {
        let req = format!("POST /a HTTP/1.0\r\nContent-Length: {}\r\n\r\n", value);

        assert_eq!(
            parse_http_request(req.as_bytes()),
            Err(ParseError::InvalidContentLength),
            "value {:?}",
            value
        );
    }
}

#[test]
fn test_parse_keeps_traversal_paths_for_the_caller() {
    let (parsed, _) = parse_http_request(b"GET /a/../../etc/passwd HTTP/1.0\r\n\r\n").unwrap();

    assert!(parsed.escapes_root());
}

#[test]
fn test_parse_plain_dotted_names_do_not_escape() {
    let (parsed, _) = parse_http_request(b"GET /archive..tar HTTP/1.0\r\n\r\n").unwrap();

    assert!(!parsed.escapes_root());
}
