//! 事件处理
//!
//! 轮询 crossterm 键盘事件，将 Ctrl+L/Ctrl+R/Ctrl+S/Ctrl+Q/Esc 转为 Command 或界面动作，
//! 其余按键交给 run_app 拼 input_buffer，Enter 时 send_submit。

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::core::Command;

/// 应用事件：来自快捷键的 Command、界面本地动作或原始 KeyEvent
#[derive(Debug, Clone)]
pub enum AppEvent {
    Command(Command),
    /// 切换统计面板（打开时顺带拉取一次统计）
    ToggleStats,
    Key(KeyEvent),
}

/// 事件处理器：持有 cmd_tx，poll 时读键盘并返回 AppEvent，send_submit 发送用户输入
pub struct EventHandler {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl EventHandler {
    pub fn new(cmd_tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { cmd_tx }
    }

    pub fn poll(&self) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(self.handle_key(key)));
                }
            }
        }
        Ok(None)
    }

    fn handle_key(&self, key: KeyEvent) -> AppEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('l') if ctrl => {
                self.send(Command::Clear);
                AppEvent::Command(Command::Clear)
            }
            KeyCode::Char('r') if ctrl => {
                self.send(Command::RefreshStatus);
                AppEvent::Command(Command::RefreshStatus)
            }
            KeyCode::Char('s') if ctrl => AppEvent::ToggleStats,
            KeyCode::Char('q') if ctrl => AppEvent::Command(Command::Quit),
            KeyCode::Esc => AppEvent::Command(Command::Quit),
            _ => AppEvent::Key(key),
        }
    }

    pub fn send(&self, cmd: Command) {
        let _ = self.cmd_tx.send(cmd);
    }

    pub fn send_submit(&self, input: String) {
        self.send(Command::Send(input));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_shortcuts_map_to_commands() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = EventHandler::new(tx);

        assert!(matches!(handler.handle_key(ctrl('l')), AppEvent::Command(Command::Clear)));
        assert_eq!(rx.try_recv().unwrap(), Command::Clear);

        assert!(matches!(
            handler.handle_key(ctrl('r')),
            AppEvent::Command(Command::RefreshStatus)
        ));
        assert_eq!(rx.try_recv().unwrap(), Command::RefreshStatus);

        assert!(matches!(handler.handle_key(ctrl('s')), AppEvent::ToggleStats));
        assert!(matches!(handler.handle_key(ctrl('q')), AppEvent::Command(Command::Quit)));
        assert!(rx.try_recv().is_err());

        let plain = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert!(matches!(handler.handle_key(plain), AppEvent::Key(_)));
    }
}
