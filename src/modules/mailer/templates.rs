//! Inline HTML e-mail templates, rendered with minijinja.

pub const WELCOME: &str = r#"
<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #646cff;">Welcome to Filedock!</h2>
  <p>Hello {{ user_name }},</p>
  <p>Thank you for registering. Your account has been successfully created.</p>
  <p>You can now:</p>
  <ul>
    <li>Upload and manage files with rich metadata</li>
    <li>Search files by tags, metadata and content</li>
    <li>Track your items in real time</li>
  </ul>
  <p>If you have any questions, please contact our support team.</p>
  <p>Best regards,<br>The Filedock Team</p>
</div>
"#;

pub const FILE_UPLOADED: &str = r#"
<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #646cff;">File Upload Successful</h2>
  <p>Hello {{ user_name }},</p>
  <p>Your file <strong>{{ file_name }}</strong> has been successfully uploaded.</p>
  <p>The file is now available in your dashboard.</p>
  <p>Best regards,<br>The Filedock Team</p>
</div>
"#;
