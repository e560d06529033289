use lettre::{
    Message, SmtpTransport, Transport,
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
};
use log::{info, error, warn};

pub struct EmailService;

impl EmailService {
    pub async fn send_otp_email(email: &str, otp: &str, username: &str) -> bool {
        match Self::try_send_otp(email, otp, username).await {
            Ok(_) => {
                info!("OTP email sent successfully to {}", email);
                true
            }
            Err(e) => {
                error!("Failed to send OTP email to {}: {}", email, e);
                false
            }
        }
    }

    async fn try_send_otp(email: &str, otp: &str, username: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mail_user = crate::config::Config::mail_user();
        let mail_password = crate::config::Config::mail_password();

        if mail_user.is_empty() || mail_password.is_empty() {
            warn!("Email credentials not configured. Skipping email send.");
            return Err("Email not configured".into());
        }

        let from_mailbox: Mailbox = crate::config::Config::mail_from().parse()?;
        let to_mailbox: Mailbox = email.parse()?;

        let email_body = format!(
            r#"
            <!DOCTYPE html>
            <html>
            <head>
                <style>
                    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
                    .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
                    .header {{ background: #1dbf73; color: white; padding: 30px;
                              text-align: center; border-radius: 10px 10px 0 0; }}
                    .content {{ background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px; }}
                    .otp-box {{ background: white; border: 2px dashed #1dbf73; border-radius: 8px;
                               padding: 20px; text-align: center; margin: 20px 0; }}
                    .otp-code {{ font-size: 32px; font-weight: bold; letter-spacing: 5px; color: #1dbf73; }}
                    .footer {{ text-align: center; margin-top: 20px; color: #666; font-size: 12px; }}
                </style>
            </head>
            <body>
                <div class="container">
                    <div class="header">
                        <h1>GigWork</h1>
                        <p>Verify your email address</p>
                    </div>
                    <div class="content">
                        <p>Hi {},</p>
                        <p>Use the code below to verify your GigWork account.</p>

                        <div class="otp-box">
                            <p style="margin: 0; color: #666;">Your verification code is:</p>
                            <div class="otp-code">{}</div>
                            <p style="margin: 10px 0 0 0; color: #666; font-size: 14px;">Valid for 10 minutes</p>
                        </div>

                        <p>If you didn't create an account, please ignore this email.</p>

                        <p>Best regards,<br><strong>The GigWork Team</strong></p>
                    </div>
                    <div class="footer">
                        <p>© 2025 GigWork. All rights reserved.</p>
                    </div>
                </div>
            </body>
            </html>
            "#,
            username, otp
        );

        let email_message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject("Your GigWork verification code")
            .header(ContentType::TEXT_HTML)
            .body(email_body)?;

        let creds = Credentials::new(mail_user, mail_password);
        let mailer = SmtpTransport::relay(&crate::config::Config::mail_host())?
            .credentials(creds)
            .build();

        mailer.send(&email_message)?;
        Ok(())
    }

    pub async fn send_welcome_email(email: &str, username: &str) -> bool {
        match Self::try_send_welcome(email, username).await {
            Ok(_) => {
                info!("Welcome email sent to {}", email);
                true
            }
            Err(e) => {
                error!("Failed to send welcome email: {}", e);
                false
            }
        }
    }

    async fn try_send_welcome(email: &str, username: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mail_user = crate::config::Config::mail_user();
        let mail_password = crate::config::Config::mail_password();

        if mail_user.is_empty() || mail_password.is_empty() {
            return Err("Email not configured".into());
        }

        let display_name = if username.is_empty() { "there" } else { username };

        let from_mailbox: Mailbox = crate::config::Config::mail_from().parse()?;
        let to_mailbox: Mailbox = email.parse()?;

        let email_body = format!(
            r#"
            <!DOCTYPE html>
            <html>
            <body>
                <h1>Welcome to GigWork!</h1>
                <p>Hi {},</p>
                <p>Your email is verified and your account is ready.</p>
                <p>With GigWork, you can:</p>
                <ul>
                    <li>Browse gigs and order from talented sellers</li>
                    <li>Post projects and collect freelancer proposals</li>
                    <li>Offer your own services as a seller</li>
                    <li>Message buyers and sellers directly</li>
                </ul>
                <p>Best regards,<br><strong>The GigWork Team</strong></p>
            </body>
            </html>
            "#,
            display_name
        );

        let email_message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject("Welcome to GigWork!")
            .header(ContentType::TEXT_HTML)
            .body(email_body)?;

        let creds = Credentials::new(mail_user, mail_password);
        let mailer = SmtpTransport::relay(&crate::config::Config::mail_host())?
            .credentials(creds)
            .build();

        mailer.send(&email_message)?;
        Ok(())
    }
}
