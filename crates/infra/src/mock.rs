//! # テスト用モック
//!
//! ユースケーステスト・ハンドラテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! courseworker-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! | モック | 置き換える対象 | 観測できるもの |
//! |-------|--------------|--------------|
//! | [`MockDatabase`] | 各リポジトリ | 所有者問い合わせ回数、障害注入 |
//! | [`MockCacheStore`] | [`CacheStore`] | 呼び出し回数、障害注入 |
//! | [`MockConfirmationMailer`] | [`ConfirmationMailer`] | 送信内容 |
//! | [`MockPasswordHasher`] | [`PasswordHasher`] | なし |

use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use courseworker_domain::{
    course::{Course, CourseId, NewCourse},
    password::{PasswordHash, PasswordVerifyResult, PlainPassword},
    task::{Task, TaskId},
    user::{Email, User, UserId},
};

use crate::{
    cache::CacheStore,
    error::InfraError,
    mailer::ConfirmationMailer,
    password::PasswordHasher,
    repository::{CourseRepository, OwnershipRepository, TaskRepository, UserRepository},
};

// ===== MockDatabase =====

struct MockState {
    users:          Vec<User>,
    courses:        Vec<Course>,
    tasks:          Vec<Task>,
    next_course_id: i64,
}

/// 全リポジトリトレイトを実装するインメモリデータベース
///
/// 講座とタスクを同じ状態で持つため、所有者の問い合わせは
/// 講座・タスクの登録内容と常に一致する。
#[derive(Clone)]
pub struct MockDatabase {
    state:         Arc<Mutex<MockState>>,
    owner_lookups: Arc<AtomicUsize>,
    failing:       Arc<AtomicBool>,
}

impl Default for MockDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDatabase {
    pub fn new() -> Self {
        Self {
            state:         Arc::new(Mutex::new(MockState {
                users:          Vec::new(),
                courses:        Vec::new(),
                tasks:          Vec::new(),
                next_course_id: 1,
            })),
            owner_lookups: Arc::new(AtomicUsize::new(0)),
            failing:       Arc::new(AtomicBool::new(false)),
        }
    }

    /// 次に採番する講座 ID を指定する
    pub fn set_next_course_id(&self, id: i64) {
        self.state.lock().unwrap().next_course_id = id;
    }

    pub fn add_user(&self, user: User) {
        self.state.lock().unwrap().users.push(user);
    }

    pub fn add_course(&self, course: Course) {
        self.state.lock().unwrap().courses.push(course);
    }

    pub fn add_task(&self, task: Task) {
        self.state.lock().unwrap().tasks.push(task);
    }

    pub fn course_count(&self) -> usize {
        self.state.lock().unwrap().courses.len()
    }

    pub fn task_count(&self) -> usize {
        self.state.lock().unwrap().tasks.len()
    }

    /// 所有者問い合わせ（[`OwnershipRepository`]）の呼び出し回数
    pub fn owner_lookups(&self) -> usize {
        self.owner_lookups.load(Ordering::SeqCst)
    }

    /// `true` にすると以降の所有者問い合わせがデータベースエラーを返す
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), InfraError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MockDatabase {
    async fn find_all(&self) -> Result<Vec<User>, InfraError> {
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id() == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, InfraError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .iter()
            .any(|u| u.email() == email))
    }

    async fn insert(&self, user: &User) -> Result<(), InfraError> {
        self.state.lock().unwrap().users.push(user.clone());
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for MockDatabase {
    async fn find_all_by_user(&self, user_id: &UserId) -> Result<Vec<Course>, InfraError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .courses
            .iter()
            .filter(|c| c.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: CourseId) -> Result<Option<Course>, InfraError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .courses
            .iter()
            .find(|c| c.id() == id)
            .cloned())
    }

    async fn insert(&self, course: NewCourse) -> Result<Course, InfraError> {
        let mut state = self.state.lock().unwrap();
        let id = CourseId::new(state.next_course_id);
        state.next_course_id += 1;
        let course = Course::from_new(id, course);
        state.courses.push(course.clone());
        Ok(course)
    }

    async fn update(&self, course: &Course) -> Result<bool, InfraError> {
        let mut state = self.state.lock().unwrap();
        match state.courses.iter_mut().find(|c| c.id() == course.id()) {
            Some(existing) => {
                *existing = course.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: CourseId) -> Result<bool, InfraError> {
        let mut state = self.state.lock().unwrap();
        let before = state.courses.len();
        state.courses.retain(|c| c.id() != id);
        let deleted = state.courses.len() < before;
        if deleted {
            state.tasks.retain(|t| t.course_id() != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl TaskRepository for MockDatabase {
    async fn find_all_by_user(&self, user_id: &UserId) -> Result<Vec<Task>, InfraError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tasks
            .iter()
            .filter(|t| {
                state
                    .courses
                    .iter()
                    .any(|c| c.id() == t.course_id() && c.user_id() == user_id)
            })
            .cloned()
            .collect())
    }

    async fn find_all_by_course(&self, course_id: CourseId) -> Result<Vec<Task>, InfraError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .filter(|t| t.course_id() == course_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(
        &self,
        course_id: CourseId,
        task_id: &TaskId,
    ) -> Result<Option<Task>, InfraError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.course_id() == course_id && t.id() == task_id)
            .cloned())
    }

    async fn insert(&self, task: &Task) -> Result<(), InfraError> {
        self.state.lock().unwrap().tasks.push(task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> Result<bool, InfraError> {
        let mut state = self.state.lock().unwrap();
        match state
            .tasks
            .iter_mut()
            .find(|t| t.course_id() == task.course_id() && t.id() == task.id())
        {
            Some(existing) => {
                *existing = task.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, course_id: CourseId, task_id: &TaskId) -> Result<bool, InfraError> {
        let mut state = self.state.lock().unwrap();
        let before = state.tasks.len();
        state
            .tasks
            .retain(|t| !(t.course_id() == course_id && t.id() == task_id));
        Ok(state.tasks.len() < before)
    }
}

#[async_trait]
impl OwnershipRepository for MockDatabase {
    async fn find_course_owner(&self, course_id: CourseId) -> Result<Option<UserId>, InfraError> {
        self.owner_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .courses
            .iter()
            .find(|c| c.id() == course_id)
            .map(|c| c.user_id().clone()))
    }

    async fn find_task_owner(
        &self,
        course_id: CourseId,
        task_id: &TaskId,
    ) -> Result<Option<UserId>, InfraError> {
        self.owner_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let state = self.state.lock().unwrap();
        let exists = state
            .tasks
            .iter()
            .any(|t| t.course_id() == course_id && t.id() == task_id);
        if !exists {
            return Ok(None);
        }
        Ok(state
            .courses
            .iter()
            .find(|c| c.id() == course_id)
            .map(|c| c.user_id().clone()))
    }
}

// ===== MockCacheStore =====

/// インメモリのキャッシュストア
///
/// [`set_failing`](Self::set_failing) でキャッシュ障害を再現できる。
#[derive(Clone, Default)]
pub struct MockCacheStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    gets:    Arc<AtomicUsize>,
    sets:    Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MockCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` にすると以降の全操作が Redis エラーを返す
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// キャッシュの中身を直接覗く（呼び出し回数には数えない）
    pub fn entry(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// キャッシュに直接値を入れる（呼び出し回数には数えない）
    pub fn insert_entry(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), InfraError> {
        if self.failing.load(Ordering::SeqCst) {
            let err = redis::RedisError::from(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ));
            return Err(err.into());
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MockCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.entry(key))
    }

    async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> Result<(), InfraError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.insert_entry(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), InfraError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

// ===== MockConfirmationMailer =====

/// 送信内容を記録する確認メール送信
#[derive(Clone, Default)]
pub struct MockConfirmationMailer {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockConfirmationMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送信した `(宛先, 確認リンク)` の一覧
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfirmationMailer for MockConfirmationMailer {
    async fn send_confirmation(&self, to: &Email, link: &str) -> Result<(), InfraError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.as_str().to_string(), link.to_string()));
        Ok(())
    }
}

// ===== MockPasswordHasher =====

/// Argon2 を使わない高速なパスワードハッシュ
///
/// `hashed:{平文}` をハッシュとして扱う。
#[derive(Clone, Default)]
pub struct MockPasswordHasher;

impl PasswordHasher for MockPasswordHasher {
    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError> {
        Ok(PasswordHash::new(format!("hashed:{}", password.as_str())))
    }

    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError> {
        if hash.is_unset() {
            return Ok(PasswordVerifyResult::Mismatch);
        }
        Ok(PasswordVerifyResult::from(
            hash.as_str() == format!("hashed:{}", password.as_str()),
        ))
    }
}
