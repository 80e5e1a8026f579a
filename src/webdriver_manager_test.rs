#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_command_exists() {
        #[cfg(unix)]
        {
            assert!(WebDriverManager::command_exists("ls"));
            assert!(!WebDriverManager::command_exists(
                "nonexistent_command_12345"
            ));
        }

        #[cfg(windows)]
        {
            assert!(WebDriverManager::command_exists("cmd"));
            assert!(!WebDriverManager::command_exists(
                "nonexistent_command_12345"
            ));
        }
    }

    #[test]
    fn test_find_free_port() {
        let port = WebDriverManager::find_free_port().unwrap();
        assert!(port > 0);
    }

    #[test]
    fn test_is_port_in_use() {
        // Port 0 is special and should not be in use
        assert!(!WebDriverManager::is_port_in_use(0));

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(WebDriverManager::is_port_in_use(port));
    }

    #[tokio::test]
    async fn test_is_driver_running() {
        assert!(!WebDriverManager::is_driver_running("http://localhost:65432").await);
    }

    #[tokio::test]
    async fn test_verify_driver_working_rejects_dead_port() {
        assert!(!WebDriverManager::verify_driver_working("http://localhost:65431").await);
    }

    #[test]
    fn test_stop_all_empty() {
        let manager = WebDriverManager::new();
        manager.stop_all();
        assert_eq!(manager.managed_count(), 0);
    }

    #[test]
    fn test_restart_clears_tracked_processes() {
        let manager = WebDriverManager::new();
        manager.restart();
        assert_eq!(manager.managed_count(), 0);
    }
}
