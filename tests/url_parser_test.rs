//! Tests for share link parsing.

use share_transfer::url_parser::extract_share_code;
use share_transfer::ShareError;

mod query_parameter {
    use super::*;

    #[test]
    fn password_parameter() {
        let code = extract_share_code("https://115.com/s/sw3abc?password=ab12").unwrap();
        assert_eq!(code.share_code, "sw3abc");
        assert_eq!(code.receive_code, "ab12");
    }

    #[test]
    fn pwd_parameter() {
        let code = extract_share_code("https://115.com/s/sw3abc?pwd=Zx90").unwrap();
        assert_eq!(code.receive_code, "Zx90");
    }

    #[test]
    fn trailing_fragment() {
        let code = extract_share_code("https://115cdn.com/s/swzk9q1?password=q7w8#").unwrap();
        assert_eq!(code.share_code, "swzk9q1");
        assert_eq!(code.receive_code, "q7w8");
    }

    #[test]
    fn www_prefix_and_http() {
        let code = extract_share_code("http://www.115.com/s/sw3abc?password=ab12").unwrap();
        assert_eq!(code.share_code, "sw3abc");
        assert_eq!(code.receive_code, "ab12");
    }
}

mod suffix_form {
    use super::*;

    #[test]
    fn dash_suffix() {
        let code = extract_share_code("https://anxia.com/s/sw3abc-ab12").unwrap();
        assert_eq!(code.share_code, "sw3abc");
        assert_eq!(code.receive_code, "ab12");
    }

    #[test]
    fn suffix_wins_over_later_label() {
        let code = extract_share_code("https://115.com/s/sw3abc-ab12 访问码：zz99").unwrap();
        assert_eq!(code.receive_code, "ab12");
    }
}

mod labelled_code {
    use super::*;

    #[test]
    fn access_code_label() {
        let text = "链接：https://115.com/s/sw3abc 访问码：k3m4 复制这段内容";
        let code = extract_share_code(text).unwrap();
        assert_eq!(code.share_code, "sw3abc");
        assert_eq!(code.receive_code, "k3m4");
    }

    #[test]
    fn extraction_code_label_ascii_colon() {
        let code = extract_share_code("https://115.com/s/sw3abc 提取码:k3m4").unwrap();
        assert_eq!(code.receive_code, "k3m4");
    }

    #[test]
    fn surrounding_whitespace() {
        let code = extract_share_code("   https://115.com/s/sw3abc?password=ab12 \n").unwrap();
        assert_eq!(code.share_code, "sw3abc");
    }
}

mod incomplete_and_invalid {
    use super::*;

    #[test]
    fn missing_receive_code_is_empty() {
        let code = extract_share_code("https://115.com/s/sw3abc").unwrap();
        assert_eq!(code.share_code, "sw3abc");
        assert_eq!(code.receive_code, "");
        assert!(!code.is_complete());
    }

    #[test]
    fn short_password_is_ignored() {
        let code = extract_share_code("https://115.com/s/sw3abc?password=ab").unwrap();
        assert_eq!(code.receive_code, "");
    }

    #[test]
    fn other_host_is_rejected() {
        let err = extract_share_code("https://example.com/s/sw3abc?password=ab12").unwrap_err();
        assert!(matches!(err, ShareError::InvalidShareUrl(_)));
    }

    #[test]
    fn plain_text_is_rejected() {
        assert!(extract_share_code("not a link").is_err());
        assert!(extract_share_code("").is_err());
    }
}
